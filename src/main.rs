mod app;
mod components;
mod core;
mod pages;

fn main() {
    wasm_logger::init(wasm_logger::Config::new(log::Level::Debug));
    log::info!("Starting Sovereign Signal mint");
    dioxus::launch(app::App);
}
