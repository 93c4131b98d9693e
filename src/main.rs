fn main() {
    if let Err(err) = ad_sales::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
