fn main() {
    if let Err(e) = medimind_lib::run() {
        eprintln!("medimind: {e}");
        std::process::exit(1);
    }
}
