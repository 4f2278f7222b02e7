//! Main application entry point (native).

use slidekit_app::AppConfig;

fn main() {
    env_logger::init();
    log::info!("Starting SlideKit");

    let result = AppConfig::from_args(std::env::args().skip(1))
        .and_then(|config| pollster::block_on(slidekit_app::run(config)));

    match result {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
        }
        Err(err) => {
            log::error!("{err}");
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
