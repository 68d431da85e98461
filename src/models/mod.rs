pub mod history;
pub mod money;
pub mod pricing;
pub mod selection;
pub mod timeline;
