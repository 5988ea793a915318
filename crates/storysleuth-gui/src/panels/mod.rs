/// Tab panels and floating windows.
pub mod browse_panel;
pub mod editor_window;
pub mod execute_panel;
pub mod matrix_window;
pub mod requirements_panel;
pub mod settings_window;
pub mod tag_panel;
