//! SeaORM entities for the monitored targets and their check history.

pub mod check_log;
pub mod target;

pub mod prelude {
    pub use super::target::Entity as Target;
    pub use super::target::Model as TargetModel;
    pub use super::target::ActiveModel as TargetActiveModel;
    pub use super::target::Column as TargetColumn;

    pub use super::check_log::Entity as CheckLog;
    pub use super::check_log::Model as CheckLogModel;
    pub use super::check_log::ActiveModel as CheckLogActiveModel;
    pub use super::check_log::Column as CheckLogColumn;
}
