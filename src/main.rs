use filewatchd::error::Error;

fn main() {
    std::process::exit(match filewatchd::run() {
        Ok(()) => 0,
        Err(err @ Error::Build(_)) | Err(err @ Error::Clap(_)) => {
            eprintln!("filewatchd: {}", err);
            1
        }
        Err(err) => {
            eprintln!("filewatchd: {}", err);
            2
        }
    });
}
