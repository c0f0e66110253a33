use albert_score_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("albert score error: {err}");
        std::process::exit(1);
    }
}
