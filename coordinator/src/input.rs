use anyhow::{bail, Context, Result};
use common::InputUnit;
use glob::{glob, Pattern};
use std::{fs, io, path::Path};
use tracing::info;

pub const INPUT_EXTENSION: &str = "txt";

/// Borra la carpeta (si existe) con todo su contenido y la vuelve a crear vacía.
pub fn prepare_dir(path: &Path) -> io::Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
        info!("carpeta borrada: {}", path.display());
    }
    fs::create_dir_all(path)?;
    info!("carpeta creada: {}", path.display());
    Ok(())
}

/// Busca los archivos `*.txt` de `input_dir`. Cada uno es una unidad de
/// entrada con su tamaño en bytes como peso. Salen ordenados por nombre.
pub fn discover_inputs(input_dir: &Path) -> Result<Vec<InputUnit>> {
    if !input_dir.is_dir() {
        bail!("el directorio de entrada {} no existe", input_dir.display());
    }

    let pattern = format!(
        "{}/*.{}",
        Pattern::escape(&input_dir.to_string_lossy()),
        INPUT_EXTENSION
    );

    let mut units = Vec::new();
    for entry in glob(&pattern).with_context(|| format!("patrón inválido {}", pattern))? {
        let path = entry?;
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        let size = fs::metadata(&path)
            .with_context(|| format!("no se pudo leer {}", path.display()))?
            .len();
        units.push(InputUnit::new(name, size));
    }

    units.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, io::Write, path::PathBuf};

    fn temp_dir(sub: &str) -> PathBuf {
        let base = env::temp_dir().join("coordinator_input_tests").join(sub);
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(&base).unwrap();
        base
    }

    #[test]
    fn discover_solo_toma_txt_con_su_tamano() {
        let tmp = temp_dir("discover");
        for (name, content) in [("b.txt", "hola mundo"), ("a.txt", "x"), ("c.csv", "1,2")] {
            let mut f = fs::File::create(tmp.join(name)).unwrap();
            write!(f, "{}", content).unwrap();
        }
        fs::create_dir_all(tmp.join("sub.txt")).unwrap();

        let units = discover_inputs(&tmp).unwrap();
        assert_eq!(
            units,
            vec![InputUnit::new("a.txt", 1), InputUnit::new("b.txt", 10)]
        );
    }

    #[test]
    fn discover_en_directorio_vacio_no_devuelve_nada() {
        let tmp = temp_dir("empty");
        assert!(discover_inputs(&tmp).unwrap().is_empty());
    }

    #[test]
    fn discover_falla_si_no_existe_el_directorio() {
        let tmp = temp_dir("missing").join("no_existe");
        assert!(discover_inputs(&tmp).is_err());
    }

    #[test]
    fn prepare_dir_deja_la_carpeta_vacia() {
        let tmp = temp_dir("prepare");
        let dir = tmp.join("intermediate");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("mr-0-1"), "viejo\n").unwrap();

        prepare_dir(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }
}
