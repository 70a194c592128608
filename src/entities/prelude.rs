pub use super::pastes::Entity as Pastes;
pub use super::users::Entity as Users;
