//! Discovery of FITS images below a download directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn is_fits(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("fits")
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, found)?;
        } else if is_fits(&path) {
            found.push(path);
        }
    }
    Ok(())
}

/// All `*.fits` files below `root`, sorted by path.
pub fn find_fits(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    walk(root, &mut found)?;
    found.sort();
    Ok(found)
}

/// Keep paths whose file name contains every `include` substring and none of
/// the `exclude` substrings.
pub fn filter_names<S: AsRef<str>>(paths: Vec<PathBuf>, include: &[S], exclude: &[S]) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            include.iter().all(|s| name.contains(s.as_ref()))
                && !exclude.iter().any(|s| name.contains(s.as_ref()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_find_fits_recursive_and_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("b/product/hd163296.cont.image.fits"));
        touch(&root.join("a/member.uid/product/elias27.cont.mask.fits"));
        touch(&root.join("a/top.fits"));
        touch(&root.join("a/readme.txt"));
        touch(&root.join("a/cube.fits.gz"));

        let found = find_fits(root).unwrap();
        assert_eq!(
            found,
            vec![
                root.join("a/member.uid/product/elias27.cont.mask.fits"),
                root.join("a/top.fits"),
                root.join("b/product/hd163296.cont.image.fits"),
            ]
        );
    }

    #[test]
    fn test_find_fits_missing_root_is_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(find_fits(&temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_filter_names() {
        let paths = vec![
            PathBuf::from("/data/cont/hd163296.cont.image.fits"),
            PathBuf::from("/data/x/hd163296.cont.mask.fits"),
            PathBuf::from("/data/cont/hd163296.spw25.cube.fits"),
        ];
        let kept = filter_names(paths, &["cont"], &["mask"]);
        assert_eq!(kept, vec![PathBuf::from("/data/cont/hd163296.cont.image.fits")]);
    }

    #[test]
    fn test_filter_names_without_patterns_keeps_all() {
        let paths = vec![PathBuf::from("a.fits"), PathBuf::from("b.fits")];
        let none: [&str; 0] = [];
        assert_eq!(filter_names(paths.clone(), &none, &none), paths);
    }
}
