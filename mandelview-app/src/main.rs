mod app;
mod app_dir;
mod input;
mod preferences;

mod ui {
    pub(crate) mod menu_bar;
    pub(crate) mod settings;
    pub(crate) mod view;
}

fn main() -> eframe::Result {
    app::run()
}
