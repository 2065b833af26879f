fn main() {
    starmap_pipeline::cli::run();
}
