fn main() {
    if let Err(err) = kgraph_layout::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
