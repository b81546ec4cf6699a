fn main() -> Result<(), Box<dyn std::error::Error>> {
    tabula_cli::runner::main(std::env::args().collect())
}
