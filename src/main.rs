use bindless_hybrid::{config::Config, flow};

fn main() -> anyhow::Result<()> {
    flow::run(Config::from_env()?)
}
