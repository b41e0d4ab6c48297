use std::collections::{HashMap, HashSet};

type NodeName = String;
type NodeRelations = Vec<(NodeName, NodeName)>;

#[derive(Debug, Default)]
pub struct Node {
    children: HashSet<NodeName>,
}

pub fn build_tree(relations: &NodeRelations) -> HashMap<NodeName, Node> {
    let mut tree: HashMap<NodeName, Node> = HashMap::new();
    let mut children = HashSet::new();

    for (parent, child) in relations {
        tree.entry(parent.clone())
            .or_default()
            .children
            .insert(child.clone());
        children.insert(child.clone());
    }

    // Find roots (tags that are never children)
    let roots: HashSet<_> = tree.keys().cloned().collect();
    let roots: HashSet<_> = roots.difference(&children).cloned().collect();

    // Ensure all tags are in the tree (including roots)
    for root in &roots {
        tree.entry(root.clone()).or_default();
    }

    tree
}

pub fn print_tree(tree: &HashMap<NodeName, Node>, tag: &NodeName, indent: usize) {
    println!("{:indent$}{}", "", tag, indent = indent * 2);
    if let Some(node) = tree.get(tag) {
        for child in &node.children {
            print_tree(tree, child, indent + 1);
        }
    }
}

/// Derives (parent, child) edges from a list of `::`-separated deck names,
/// one edge per path component.
pub fn deck_relations(names: &[String]) -> NodeRelations {
    let mut relations = Vec::new();
    for name in names {
        let components: Vec<&str> = name.split("::").collect();
        for i in 0..components.len() {
            let child = components[..=i].join("::");
            let parent = if i == 0 { String::new() } else { components[..i].join("::") };
            let edge = (parent, child);
            if !relations.contains(&edge) {
                relations.push(edge);
            }
        }
    }
    relations
}

// Usage: deck names are already `::`-separated, so each deck contributes
// one (parent, child) edge per path component.
// let deck_relations: Vec<(String, String)> = vec![
//     ("".to_string(), "Japanese".to_string()),
//     ("Japanese".to_string(), "Japanese::Verbs".to_string()),
// ];
// let tree = build_tree(&deck_relations);
// for root in tree
//     .keys()
//     .filter(|&name| deck_relations.iter().all(|(_, child)| child != name))
// {
//     print_tree(&tree, root, 0);
// }
