//! Binary entrypoint for fontinst (made by FontLab https://www.fontlab.com/)

fn main() {
    if let Err(err) = fontinst_cli::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
