fn main() {
    std::process::exit(tacc_drv::main());
}
