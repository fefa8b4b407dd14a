fn main() {
    uattools::logging::init();
    if let Err(err) = uattools::record::run(std::env::args_os()) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
