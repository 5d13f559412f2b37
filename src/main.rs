fn main() -> std::process::ExitCode {
    notetaker_lib::run()
}
