use marzban_manager::run;

fn main() -> anyhow::Result<()> {
    // Panel calls are issued one at a time.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run())
}
