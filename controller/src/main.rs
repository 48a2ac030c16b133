mod clock;
mod control;
mod dispatch;
mod runtime;
mod status_loop;
mod store;
#[cfg(test)]
mod testing;

#[cfg(feature = "rpi")]
mod aht20;
#[cfg(feature = "rpi")]
mod hd44780;
#[cfg(not(feature = "rpi"))]
mod host;
#[cfg(feature = "rpi")]
mod rpi;

#[cfg(not(feature = "rpi"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}

#[cfg(feature = "rpi")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rpi::run().await
}
