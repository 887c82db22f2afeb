pub mod gate;
pub use self::gate::gate;

pub mod health;
pub use self::health::health;
