fn main() {
    if let Err(error) = sla_dashboard_lib::run() {
        eprintln!("sla-dashboard: {:#}", error);
        std::process::exit(1);
    }
}
