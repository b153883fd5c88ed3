use std::process::ExitCode;

fn main() -> ExitCode {
    match flextime_lib::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("flextime: {err:#}");
            ExitCode::from(2)
        }
    }
}
