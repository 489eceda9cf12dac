fn main() -> anyhow::Result<()> {
    gateway_ir::cli::run_cli()
}
