// Entity Models
//
// Each entity maps one table row to one record (see `table::TableRow`).
// Reference data (currencies, countries, locations) is created by imports;
// comments and project types are edited through the admin handlers.

pub mod comment;
pub mod country;
pub mod currency;
pub mod location;
pub mod project_type;

pub use comment::Comment;
pub use country::Country;
pub use currency::Currency;
pub use location::{Location, StateAssignment};
pub use project_type::ProjectType;
