pub mod appointment;
pub mod enums;
pub mod finance;
pub mod inventory;
pub mod notification;
pub mod patient;
pub mod sample;
pub mod settings;
pub mod staff;
pub mod supplier;
pub mod test;
pub mod user;

pub use appointment::*;
pub use enums::*;
pub use finance::*;
pub use inventory::*;
pub use notification::*;
pub use patient::*;
pub use sample::*;
pub use settings::*;
pub use staff::*;
pub use supplier::*;
pub use test::*;
pub use user::*;
