use crate::support::build_or_exit;

pub fn run(catalog: String, source: String, root: String) {
    let (tree, _) = build_or_exit(&catalog, &source, &root);
    print!("{}", tree.export());
}
