pub mod editor;
pub mod gui;
pub mod logging;
pub mod notify;
