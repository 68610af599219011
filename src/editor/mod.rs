pub mod canvas;
pub mod composite;
pub mod export;
pub mod fields;
pub mod generative;
pub mod history;
pub mod input;
pub mod model;
pub mod overlay;
pub mod session;
pub mod template;
pub mod textlayout;

pub use session::EditorSession;
