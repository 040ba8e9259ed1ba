pub mod clock;
pub mod coingecko_client;
pub mod randomness;

pub use clock::{FixedClock, SystemClock};
pub use coingecko_client::CoinGeckoClient;
pub use randomness::{SeededRandom, ThreadRandom};
#[cfg(test)]
pub use randomness::ScriptedRandom;
