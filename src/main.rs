use stringverse::app::App;
use stringverse::config::SimulationConfig;
use stringverse::{CpuBackend, EngineError, MatrixEngine, StringEngine};

/// Command-line options: `--frames N`, `--seed S`, `--resolution N`, `--gpu`
struct Options {
    frames: u32,
    seed: Option<u64>,
    resolution: Option<usize>,
    gpu: bool,
}

fn parse_args() -> Result<Options, EngineError> {
    let mut options = Options {
        frames: 600,
        seed: None,
        resolution: None,
        gpu: false,
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .ok_or_else(|| EngineError::InvalidConfig(format!("{} needs a value", name)))
        };
        let invalid = |name: &str| EngineError::InvalidConfig(format!("bad value for {}", name));

        match arg.as_str() {
            "--frames" => options.frames = value("--frames")?.parse().map_err(|_| invalid("--frames"))?,
            "--seed" => options.seed = Some(value("--seed")?.parse().map_err(|_| invalid("--seed"))?),
            "--resolution" => {
                options.resolution =
                    Some(value("--resolution")?.parse().map_err(|_| invalid("--resolution"))?)
            }
            "--gpu" => options.gpu = true,
            other => return Err(EngineError::InvalidConfig(format!("unknown argument {}", other))),
        }
    }
    Ok(options)
}

fn run() -> Result<(), EngineError> {
    let options = parse_args()?;

    let mut config = SimulationConfig::default();
    if let Some(seed) = options.seed {
        config = config.with_seed(seed);
    }
    if let Some(resolution) = options.resolution {
        config = config.with_resolution(resolution);
    }

    log::info!("Stringverse headless driver, {} frames", options.frames);

    let strings = App::new(config, options.frames);
    strings.run("strings", &mut StringEngine::new())?;

    let matrix = App::new(config.with_resolution(options.resolution.unwrap_or(16)), options.frames)
        .with_perturbation(options.frames / 2);

    if options.gpu {
        #[cfg(feature = "gpu")]
        match stringverse::gpu::GpuBackend::new() {
            Ok(backend) => {
                log::info!("Matrix model on {}", backend.adapter_name());
                matrix.run("matrix", &mut MatrixEngine::new(backend))?;
                return Ok(());
            }
            Err(e) => log::warn!("{}, falling back to CPU", e),
        }

        #[cfg(not(feature = "gpu"))]
        log::warn!("Built without the gpu feature, falling back to CPU");
    }

    matrix.run("matrix", &mut MatrixEngine::new(CpuBackend))?;
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
