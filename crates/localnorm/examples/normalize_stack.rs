use image::ImageReader;
use localnorm::{plane, plane_stats, NormalizeConfig};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <config.json> <plane0.tif> [plane1.tif ...]",
            args[0]
        );
        std::process::exit(2);
    }

    let config = NormalizeConfig::from_json_file(Path::new(&args[1]))?;
    let mut stack = Vec::with_capacity(args.len() - 2);
    for path in &args[2..] {
        let img = ImageReader::open(path)?.decode()?;
        stack.push(plane::from_dynamic(&img));
    }

    config.apply_in_place(&mut stack)?;
    println!("Normalized {} plane(s) with {}.", stack.len(), config.spec.scale);

    for (i, p) in stack.iter().enumerate() {
        let stats = plane_stats(p);
        println!(
            "  plane {i}: mean={:.3} std={:.3} range=[{:.3}, {:.3}] non-finite={}",
            stats.mean, stats.std_dev, stats.min, stats.max, stats.non_finite
        );
    }
    Ok(())
}
