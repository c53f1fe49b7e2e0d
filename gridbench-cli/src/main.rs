fn main() -> anyhow::Result<()> {
    gridbench_cli::run()
}
