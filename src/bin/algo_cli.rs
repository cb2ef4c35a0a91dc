#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("algo_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use mesh_algo_engine::mesh::{EditableMesh, Scene};
    use mesh_algo_engine::registry::AlgorithmDescriptor;
    use mesh_algo_engine::workbench::Workbench;
    use serde_json::Value as JsonValue;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const USAGE: &str = r#"algo_cli (mesh-algo-engine)

USAGE:
  algo_cli list [--catalogue <path>]
  algo_cli describe <algorithm> [--catalogue <path>]
  algo_cli config <algorithm> [options]
  algo_cli run <algorithm> --obj <path> [options]

OPTIONS:
  --catalogue <path>   Load this catalogue instead of the bundled one
  --config <path>      Apply a saved configuration before running
  --set <id=value>     Set a parameter; the value is read as JSON, else as text
  --obj <path>         Input mesh (OBJ, run only)
  --out <path>         Write the resulting scene as OBJ (run only)
  --overwrite          Overwrite existing output files
  -h, --help           Show this help
"#;

    #[derive(Debug, Default)]
    struct Options {
        catalogue: Option<PathBuf>,
        config: Option<PathBuf>,
        sets: Vec<(String, JsonValue)>,
        obj: Option<PathBuf>,
        out: Option<PathBuf>,
        overwrite: bool,
    }

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                let options = parse_options(&mut args)?;
                cmd_list(&load_workbench(&options)?);
                Ok(())
            }
            "describe" => {
                let id = args.value("describe")?;
                let options = parse_options(&mut args)?;
                let workbench = load_workbench(&options)?;
                let descriptor = workbench.algorithm(&id).map_err(|e| e.to_string())?;
                cmd_describe(&workbench, descriptor);
                Ok(())
            }
            "config" => {
                let id = args.value("config")?;
                let options = parse_options(&mut args)?;
                let workbench = configured_workbench(&id, &options)?;
                cmd_config(&workbench, &id)
            }
            "run" => {
                let id = args.value("run")?;
                let options = parse_options(&mut args)?;
                cmd_run(&id, &options)
            }
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn parse_options(args: &mut Args) -> Result<Options, String> {
        let mut options = Options::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--catalogue" => options.catalogue = Some(PathBuf::from(args.value("--catalogue")?)),
                "--config" => options.config = Some(PathBuf::from(args.value("--config")?)),
                "--set" => options.sets.push(parse_assignment(&args.value("--set")?)?),
                "--obj" => options.obj = Some(PathBuf::from(args.value("--obj")?)),
                "--out" => options.out = Some(PathBuf::from(args.value("--out")?)),
                "--overwrite" => options.overwrite = true,
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }
        Ok(options)
    }

    fn parse_assignment(text: &str) -> Result<(String, JsonValue), String> {
        let (name, value) = text
            .split_once('=')
            .ok_or_else(|| format!("expected <id=value>, got `{text}`"))?;
        let value = serde_json::from_str(value).unwrap_or_else(|_| JsonValue::String(value.to_owned()));
        Ok((name.trim().to_owned(), value))
    }

    fn load_workbench(options: &Options) -> Result<Workbench, String> {
        match options.catalogue.as_deref() {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
                let mut workbench = Workbench::new();
                let report = workbench.load_catalogue_str(&text).map_err(|e| e.to_string())?;
                eprintln!("loaded {} algorithms from {}", report.loaded.len(), path.display());
                Ok(workbench)
            }
            None => Workbench::with_default_catalogue().map_err(|e| e.to_string()),
        }
    }

    fn configured_workbench(id: &str, options: &Options) -> Result<Workbench, String> {
        let mut workbench = load_workbench(options)?;
        if let Some(path) = options.config.as_deref() {
            let text = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
            let algorithm = workbench.import_configuration(&text).map_err(|e| e.to_string())?;
            eprintln!("applied configuration for {algorithm}");
        }
        for (name, value) in &options.sets {
            workbench
                .set_parameter(id, name, value)
                .map_err(|e| e.to_string())?;
        }
        Ok(workbench)
    }

    fn cmd_list(workbench: &Workbench) {
        for descriptor in workbench.registry().algorithms() {
            let ready = workbench.store().is_ready(descriptor);
            println!(
                "{:<32} {:<20} {}{}",
                descriptor.id,
                descriptor.backend_id.to_string(),
                descriptor.display_name,
                if ready { "" } else { " (needs a choice)" }
            );
        }
    }

    fn cmd_describe(workbench: &Workbench, descriptor: &AlgorithmDescriptor) {
        println!("{} ({})", descriptor.display_name, descriptor.id);
        for line in &descriptor.description.lines {
            println!("  {line}");
        }
        let steps: Vec<String> = descriptor.input_pipeline.iter().map(ToString::to_string).collect();
        println!("input: {}", steps.join(", "));
        println!("functions: {}", descriptor.backend_function_names.join(" -> "));

        for (spec, value) in workbench.store().resolved(descriptor) {
            let step = spec
                .step_index
                .map_or_else(|| "option".to_owned(), |index| format!("step {}", index + 1));
            println!("- {} [{}, {step}] = {value}", spec.id, spec.kind.name());
            for item in &spec.items {
                println!("    {} {}", item.id, item.label);
            }
        }
    }

    fn cmd_config(workbench: &Workbench, id: &str) -> Result<(), String> {
        let configuration = workbench.export_configuration(id).map_err(|e| e.to_string())?;
        let file_name = workbench.suggested_file_name(id).map_err(|e| e.to_string())?;
        eprintln!("suggested file name: {file_name}");
        println!("{}", configuration.to_json().map_err(|e| e.to_string())?);
        Ok(())
    }

    fn cmd_run(id: &str, options: &Options) -> Result<(), String> {
        let input = options.obj.as_deref().ok_or("run requires --obj <path>")?;
        let workbench = configured_workbench(id, options)?;
        let mut scene = Scene::new(read_obj_file(input)?);

        let results = workbench.run(id, &mut scene).map_err(|e| e.to_string())?;
        let kinds: Vec<&str> = results.output_kinds().iter().map(|kind| kind.name()).collect();
        eprintln!(
            "{id}: outputs={} vertices={} faces={} added={}",
            kinds.join(","),
            scene.active.vertices.len(),
            scene.active.faces.len(),
            scene.added.len()
        );
        if !scene.message.is_empty() {
            println!("{}", scene.message);
        }

        if let Some(path) = options.out.as_deref() {
            write_obj_file(path, &scene, options.overwrite)?;
            eprintln!("wrote {}", path.display());
        }
        Ok(())
    }

    fn read_obj_file(path: &Path) -> Result<EditableMesh, String> {
        let text = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
        let name = path
            .file_stem()
            .map_or_else(|| "mesh".to_owned(), |stem| stem.to_string_lossy().into_owned());
        parse_obj(&name, &text)
    }

    fn parse_obj(name: &str, text: &str) -> Result<EditableMesh, String> {
        let mut vertices: Vec<[f64; 3]> = Vec::new();
        let mut faces: Vec<Vec<u32>> = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("v") => {
                    let coords: Vec<f64> = parts
                        .take(3)
                        .map(str::parse)
                        .collect::<Result<_, _>>()
                        .map_err(|e| format!("line {}: {e}", line_no + 1))?;
                    let [x, y, z] = coords[..] else {
                        return Err(format!("line {}: vertex needs 3 coordinates", line_no + 1));
                    };
                    vertices.push([x, y, z]);
                }
                Some("f") => {
                    let face = parts
                        .map(|corner| obj_index(corner, vertices.len()))
                        .collect::<Option<Vec<u32>>>()
                        .ok_or_else(|| format!("line {}: invalid face index", line_no + 1))?;
                    if face.len() < 3 {
                        return Err(format!("line {}: face needs at least 3 corners", line_no + 1));
                    }
                    faces.push(face);
                }
                _ => {}
            }
        }

        Ok(EditableMesh::new(name, vertices, faces))
    }

    // `v`, `v/vt` and `v/vt/vn`; negative indices count from the end.
    fn obj_index(corner: &str, vertex_count: usize) -> Option<u32> {
        let raw: i64 = corner.split('/').next()?.parse().ok()?;
        let index = if raw < 0 {
            i64::try_from(vertex_count).ok()? + raw
        } else {
            raw - 1
        };
        u32::try_from(index).ok().filter(|index| (*index as usize) < vertex_count)
    }

    fn write_obj_file(path: &Path, scene: &Scene, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);
        writeln!(w, "# mesh-algo-engine algo_cli").map_err(|e| format!("write obj: {e}"))?;

        let mut offset = 1;
        for mesh in std::iter::once(&scene.active).chain(&scene.added) {
            writeln!(w, "o {}", mesh.name).map_err(|e| format!("write obj: {e}"))?;
            for p in &mesh.vertices {
                writeln!(w, "v {} {} {}", p[0], p[1], p[2]).map_err(|e| format!("write obj: {e}"))?;
            }
            for face in &mesh.faces {
                let corners: Vec<String> = face.iter().map(|i| (i + offset).to_string()).collect();
                writeln!(w, "f {}", corners.join(" ")).map_err(|e| format!("write obj: {e}"))?;
            }
            offset += mesh.vertices.len() as u32;
        }

        w.flush().map_err(|e| format!("flush obj: {e}"))
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn parses_quad_with_texture_indices() {
            let mesh = parse_obj(
                "quad",
                "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1/1 2/2 3/3 -1/4\n",
            )
            .expect("geldige obj");
            assert_eq!(mesh.vertices.len(), 4);
            assert_eq!(mesh.faces, vec![vec![0, 1, 2, 3]]);
        }

        #[test]
        fn rejects_out_of_range_face() {
            assert!(parse_obj("bad", "v 0 0 0\nf 1 2 3\n").is_err());
        }

        #[test]
        fn assignment_falls_back_to_text() {
            assert_eq!(
                parse_assignment("clusters=4").expect("toewijzing"),
                ("clusters".to_owned(), JsonValue::from(4))
            );
            assert_eq!(
                parse_assignment("output_option=SEGMENTS_COLOR").expect("toewijzing"),
                ("output_option".to_owned(), JsonValue::from("SEGMENTS_COLOR"))
            );
        }
    }
}
