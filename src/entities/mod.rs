pub mod prelude;

pub mod pastes;
pub mod users;
