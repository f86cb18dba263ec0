use projconv::resolver::ResolverBuilder;
use projconv::{generate_vcxproj, generate_xcode, pbxproj, vcxproj, xcode};
use std::time::{Duration, Instant};

fn bench<T>(label: &str, iterations: u32, mut f: impl FnMut() -> T) -> (Duration, T) {
    // Warmup
    for _ in 0..5 {
        std::hint::black_box(f());
    }

    let mut total = Duration::ZERO;
    let mut last = None;
    for _ in 0..iterations {
        let start = Instant::now();
        let result = f();
        total += start.elapsed();
        last = Some(result);
    }

    let avg = total / iterations;
    println!("{label:<45} {iterations:>6} iterations   avg {avg:>12.3?}   total {total:>12.3?}");
    (avg, last.unwrap())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let vcx = std::fs::read_to_string("example.vcxproj")
        .expect("example.vcxproj not found, run from repo root");
    let pbx = std::fs::read_to_string("example.pbxproj")
        .expect("example.pbxproj not found, run from repo root");
    let cmake = std::fs::read_to_string("example.cmake")
        .expect("example.cmake not found, run from repo root");

    let iterations = 1000;

    println!("─── Visual Studio: example.vcxproj ({} bytes) ───", vcx.len());
    println!();

    let (_, model) = bench("vcxproj::parse", iterations, || vcxproj::parse(&vcx, "example"));
    let (_, script) = bench("generate_vcxproj", iterations, || generate_vcxproj(&model));
    println!("{:<45} {} bytes", "generated script", script.len());

    let conditions: Vec<String> = vcx
        .lines()
        .filter_map(|l| l.split("Condition=\"").nth(1))
        .filter_map(|rest| rest.split('"').next())
        .map(String::from)
        .collect();
    let cond_count = conditions.len();
    bench(
        &format!("configuration_selector x{cond_count}"),
        iterations,
        || {
            for cond in &conditions {
                std::hint::black_box(projconv::condition::configuration_selector(cond));
            }
        },
    );

    println!();
    println!("─── Xcode: example.pbxproj ({} bytes) ───", pbx.len());
    println!();

    bench("pbxproj::split_objects", iterations, || pbxproj::split_objects(&pbx).len());
    let (_, model) = bench("xcode::parse", iterations, || {
        xcode::parse(&pbx, "example").unwrap()
    });
    bench("generate_xcode", iterations, || generate_xcode(&model));

    println!();
    println!("─── Resolver: example.cmake ({} bytes) ───", cmake.len());
    println!();

    let mut resolver = ResolverBuilder::new().env_var("DEMO_TOOLS", "/opt/tools").build();
    bench("initialize + parse_content", iterations, || {
        resolver.initialize(&["/work/demo"]);
        resolver.parse_content(&cmake, None)
    });
    bench("resolve_path", iterations, || {
        resolver.resolve("${GENERATED_DIR}/${PROJECT_NAME}_version.h")
    });

    println!();
    println!("Done.");
}
