mod settings;

pub use settings::{Command, Config, EditorSettings, LaunchSettings, Settings};
