/// UI widgets for StorySleuth.
pub mod console_view;
pub mod notice_bar;
pub mod status_bar;
pub mod story_list;
pub mod toolbar;
