pub mod mission;
pub mod view;

pub use mission::Mission;
pub use view::{BaseViewModel, HomeViewModel, MissionViewModel};
