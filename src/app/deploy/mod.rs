pub mod apply_changes;
pub mod redefiners;
