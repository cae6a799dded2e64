use std::{
    collections::{hash_map::Entry, HashMap},
    fs::{self, File, OpenOptions},
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::task::TaskId;

/* =========================
   Tokenizado y buckets
   ========================= */

/// Separa una línea en tokens normalizados:
/// corta por espacios, quita la puntuación de los bordes y pasa a minúscula.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace()
        .map(|raw| raw.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Bucket (tarea reduce) dueña de un token: primer carácter en minúscula
/// módulo `num_reduce`. Todos los tokens que empiezan con la misma letra
/// van al mismo bucket.
pub fn bucket_for(token: &str, num_reduce: u32) -> u32 {
    let first = token
        .chars()
        .next()
        .and_then(|c| c.to_lowercase().next())
        .unwrap_or('\0');
    (first as u32) % num_reduce.max(1)
}

/* =========================
   Nombres de archivos
   ========================= */

pub fn intermediate_file_name(map_id: TaskId, bucket: u32) -> String {
    format!("mr-{}-{}", map_id, bucket)
}

pub fn output_file_name(reduce_id: TaskId) -> String {
    format!("out-{}", reduce_id)
}

/// Inversa de [`intermediate_file_name`]: `mr-<map>-<bucket>` -> (map, bucket).
pub fn parse_intermediate_file_name(name: &str) -> Option<(TaskId, u32)> {
    let rest = name.strip_prefix("mr-")?;
    let (map_id, bucket) = rest.split_once('-')?;
    Some((map_id.parse().ok()?, bucket.parse().ok()?))
}

/* =========================
   Tarea map
   ========================= */

/// Ejecuta una tarea map:
/// lee cada archivo de `files` dentro de `input_dir`, tokeniza y agrega cada
/// token (uno por línea) a `intermediate_dir/mr-<map_id>-<bucket>`.
///
/// Sólo escribe archivos con su propio `map_id`, así que varias tareas map
/// pueden correr a la vez sin pisarse.
pub fn run_map_task(
    map_id: TaskId,
    files: &[String],
    input_dir: &Path,
    intermediate_dir: &Path,
    num_reduce: u32,
) -> io::Result<()> {
    fs::create_dir_all(intermediate_dir)?;

    // Un writer por bucket, abierto en modo append la primera vez que se usa
    let mut writers: HashMap<u32, BufWriter<File>> = HashMap::new();

    for name in files {
        let file = File::open(input_dir.join(name))?;
        let reader = BufReader::new(file);

        for line in reader.lines() {
            let line = line?;
            for token in tokenize(&line) {
                let bucket = bucket_for(&token, num_reduce);
                let writer = match writers.entry(bucket) {
                    Entry::Occupied(e) => e.into_mut(),
                    Entry::Vacant(e) => {
                        let path = intermediate_dir.join(intermediate_file_name(map_id, bucket));
                        let f = OpenOptions::new().create(true).append(true).open(path)?;
                        e.insert(BufWriter::new(f))
                    }
                };
                writeln!(writer, "{}", token)?;
            }
        }
    }

    for w in writers.values_mut() {
        w.flush()?;
    }
    Ok(())
}

/* =========================
   Tarea reduce
   ========================= */

/// Lista las particiones intermedias que le tocan al bucket `reduce_id`,
/// ordenadas por nombre.
pub fn partitions_for_bucket(intermediate_dir: &Path, reduce_id: TaskId) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(intermediate_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some((_, bucket)) = parse_intermediate_file_name(name) {
            if bucket == reduce_id {
                out.push(entry.path());
            }
        }
    }
    out.sort();
    Ok(out)
}

/// Ejecuta una tarea reduce: cuenta los tokens de todas las particiones del
/// bucket y escribe `output_dir/out-<reduce_id>` con líneas `token count`
/// ordenadas por token. Si no hay particiones queda un archivo vacío.
pub fn run_reduce_task(reduce_id: TaskId, intermediate_dir: &Path, output_dir: &Path) -> io::Result<()> {
    let partitions = if intermediate_dir.exists() {
        partitions_for_bucket(intermediate_dir, reduce_id)?
    } else {
        Vec::new()
    };

    let mut counts: HashMap<String, u64> = HashMap::new();
    for path in &partitions {
        let reader = BufReader::new(File::open(path)?);
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            *counts.entry(line).or_insert(0) += 1;
        }
    }

    fs::create_dir_all(output_dir)?;
    let out_file = File::create(output_dir.join(output_file_name(reduce_id)))?;
    let mut writer = BufWriter::new(out_file);

    let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    for (word, count) in entries {
        writeln!(writer, "{} {}", word, count)?;
    }

    writer.flush()?;
    Ok(())
}
