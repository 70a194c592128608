pub mod clock;
pub use clock::{Clock, ManualClock, SystemClock};

pub mod policy;
pub use policy::{Denial, Gone};

pub mod token;
pub use token::{Identity, TokenService};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, AuthSession, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod paste_service;
pub mod paste_service_impl;
pub use paste_service::{Dashboard, DashboardCounts, PasteError, PasteService};
pub use paste_service_impl::DefaultPasteService;
