//! Render one emblem from sprites on a local directory origin
//!
//! cargo run --example render_emblem -- <sprite-dir> [KEY] [OUT]

use emblemgen::{DirOrigin, EmblemRequest, EmblemService, NoCache, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let dir = args.next().ok_or("usage: render_emblem <sprite-dir> [KEY] [OUT]")?;
    let key = args.next().unwrap_or_else(|| "P10-S0-EP0-ES1-EF37-EB5-ET0".to_string());
    let out = args.next().unwrap_or_else(|| format!("{}.png", key));

    let req: EmblemRequest = key.parse()?;
    let service = EmblemService::new(DirOrigin::new(dir), NoCache, ServiceConfig::default());
    let body = service.render(&req.validated()?).await?;

    std::fs::write(&out, &body)?;
    println!("{} -> {} ({} bytes)", req, out, body.len());
    Ok(())
}
