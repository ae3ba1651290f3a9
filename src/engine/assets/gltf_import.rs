//! glTF 2.0 → `ModelAsset`.
//!
//! Only geometry and the node hierarchy are imported. Materials are left behind: every
//! caller in this crate re-skins the whole model with one shared material anyway.

use glam::{Quat, Vec3};
use gltf::Gltf;

use crate::engine::Universe;
use crate::engine::assets::AssetError;
use crate::engine::graphics::{CpuMesh, MaterialHandle, Renderable};
use crate::engine::scene::{Node, NodeKey, NodeKind, Transform};

/// CPU-side model: a node tree with owned mesh data.
#[derive(Debug, Clone, Default)]
pub struct ModelAsset {
    pub name: String,
    pub roots: Vec<ModelNode>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelNode {
    pub name: String,
    pub transform: Transform,
    /// One entry per triangle primitive.
    pub meshes: Vec<CpuMesh>,
    pub children: Vec<ModelNode>,
}

impl ModelAsset {
    pub fn mesh_count(&self) -> usize {
        fn count(n: &ModelNode) -> usize {
            n.meshes.len() + n.children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }

    pub fn triangle_count(&self) -> u32 {
        fn count(n: &ModelNode) -> u32 {
            n.meshes.iter().map(CpuMesh::triangle_count).sum::<u32>()
                + n.children.iter().map(count).sum::<u32>()
        }
        self.roots.iter().map(count).sum()
    }

    /// Add a copy of this model to the scene under a fresh root group and return that root.
    ///
    /// Every mesh gets its own registry entry; all of them render with `material`.
    pub fn instantiate(&self, universe: &mut Universe, material: MaterialHandle) -> NodeKey {
        let root = universe.scene.add(Node::group(&self.name));
        for node in &self.roots {
            node.spawn(universe, root, material);
        }
        root
    }
}

impl ModelNode {
    fn spawn(&self, universe: &mut Universe, parent: NodeKey, material: MaterialHandle) {
        let kind = match self.meshes.as_slice() {
            [single] => NodeKind::Mesh(Renderable::new(
                universe.assets.add_mesh(single.clone()),
                material,
            )),
            _ => NodeKind::Group,
        };
        let node = Node::new(&self.name, kind).with_transform(self.transform);
        let Some(key) = universe.scene.add_child(parent, node) else {
            return;
        };

        if self.meshes.len() > 1 {
            for (i, mesh) in self.meshes.iter().enumerate() {
                let renderable = Renderable::new(universe.assets.add_mesh(mesh.clone()), material);
                universe
                    .scene
                    .add_child(key, Node::mesh(format!("{}.{i}", self.name), renderable));
            }
        }

        for child in &self.children {
            child.spawn(universe, key, material);
        }
    }
}

/// Parse a `.gltf` or `.glb` document.
///
/// `fetch_uri` supplies external buffers, given the URI exactly as written in the
/// document. Embedded `data:` URIs are not supported.
pub fn import_model(
    name: &str,
    bytes: &[u8],
    mut fetch_uri: impl FnMut(&str) -> Result<Vec<u8>, AssetError>,
) -> Result<ModelAsset, AssetError> {
    let gltf = Gltf::from_slice(bytes)?;
    let buffers = load_buffers(&gltf, &mut fetch_uri)?;

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| AssetError::Unsupported(format!("{name}: document has no scene")))?;

    let roots = scene
        .nodes()
        .map(|node| import_node(&node, &buffers))
        .collect::<Result<Vec<_>, _>>()?;

    let model = ModelAsset {
        name: name.to_string(),
        roots,
    };
    log::debug!(
        "imported {name}: {} meshes, {} triangles",
        model.mesh_count(),
        model.triangle_count()
    );
    Ok(model)
}

fn load_buffers(
    gltf: &Gltf,
    fetch_uri: &mut impl FnMut(&str) -> Result<Vec<u8>, AssetError>,
) -> Result<Vec<Vec<u8>>, AssetError> {
    let mut out = Vec::new();
    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or_else(|| AssetError::Unsupported("missing GLB binary chunk".into()))?,
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                return Err(AssetError::Unsupported(
                    "embedded data: URI buffers".into(),
                ));
            }
            gltf::buffer::Source::Uri(uri) => fetch_uri(uri)?,
        };

        if data.len() < buffer.length() {
            return Err(AssetError::Unsupported(format!(
                "buffer {} holds {} bytes, expected {}",
                buffer.index(),
                data.len(),
                buffer.length()
            )));
        }
        out.push(data);
    }
    Ok(out)
}

fn import_node(node: &gltf::Node, buffers: &[Vec<u8>]) -> Result<ModelNode, AssetError> {
    let (translation, rotation, scale) = node.transform().decomposed();

    let mut meshes = Vec::new();
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "skipping {:?} primitive in mesh {}",
                    primitive.mode(),
                    mesh.index()
                );
                continue;
            }
            meshes.push(import_primitive(&primitive, buffers)?);
        }
    }

    let children = node
        .children()
        .map(|child| import_node(&child, buffers))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ModelNode {
        name: node
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("node{}", node.index())),
        transform: Transform {
            translation: Vec3::from(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from(scale),
        },
        meshes,
        children,
    })
}

fn import_primitive(
    primitive: &gltf::Primitive,
    buffers: &[Vec<u8>],
) -> Result<CpuMesh, AssetError> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| AssetError::Unsupported("mesh primitive without positions".into()))?
        .collect();
    let normals = reader.read_normals().map(|n| n.collect());
    let uvs = reader.read_tex_coords(0).map(|t| t.into_f32().collect());
    let indices = reader.read_indices().map(|i| i.into_u32().collect());

    Ok(CpuMesh::from_attributes(positions, normals, uvs, indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graphics::Material;

    fn triangle_bin() -> Vec<u8> {
        [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect()
    }

    fn triangle_json(buffer: &str) -> String {
        format!(
            r#"{{
                "asset": {{ "version": "2.0" }},
                "scene": 0,
                "scenes": [{{ "nodes": [0] }}],
                "nodes": [
                    {{ "name": "body", "mesh": 0, "translation": [1.0, 2.0, 3.0], "children": [1] }},
                    {{ "name": "wing", "mesh": 0 }}
                ],
                "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }} }}] }}],
                "accessors": [{{
                    "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                    "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
                }}],
                "bufferViews": [{{ "buffer": 0, "byteLength": 36 }}],
                "buffers": [{{ "byteLength": 36 {buffer} }}]
            }}"#
        )
    }

    fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
        let mut json = json.as_bytes().to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = bin.to_vec();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&bin);
        out
    }

    #[test]
    fn external_buffer_is_fetched_by_uri() {
        let json = triangle_json(r#", "uri": "tri.bin""#);
        let mut asked = Vec::new();

        let model = import_model("tri", json.as_bytes(), |uri| {
            asked.push(uri.to_string());
            Ok(triangle_bin())
        })
        .unwrap();

        assert_eq!(asked, ["tri.bin"]);
        assert_eq!(model.roots.len(), 1);

        let body = &model.roots[0];
        assert_eq!(body.name, "body");
        assert_eq!(body.transform.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(body.meshes[0].vertex_count(), 3);
        assert_eq!(body.meshes[0].index_count(), 3);
        // No normals in the file: recomputed from the face, which lies in the XY plane.
        assert_eq!(body.meshes[0].vertices[0].normal, [0.0, 0.0, 1.0]);

        assert_eq!(body.children.len(), 1);
        assert_eq!(model.mesh_count(), 2);
        assert_eq!(model.triangle_count(), 2);
    }

    #[test]
    fn glb_uses_embedded_chunk() {
        let bytes = glb(&triangle_json(""), &triangle_bin());

        let model = import_model("tri", &bytes, |uri| {
            panic!("unexpected fetch of {uri}");
        })
        .unwrap();

        assert_eq!(model.mesh_count(), 2);
    }

    #[test]
    fn data_uris_are_rejected() {
        let json = triangle_json(r#", "uri": "data:application/octet-stream;base64,AAAA""#);

        let err = import_model("tri", json.as_bytes(), |_| Ok(Vec::new())).unwrap_err();
        assert!(matches!(err, AssetError::Unsupported(_)));
    }

    #[test]
    fn short_buffer_is_an_error() {
        let json = triangle_json(r#", "uri": "tri.bin""#);

        let err = import_model("tri", json.as_bytes(), |_| Ok(vec![0; 8])).unwrap_err();
        assert!(matches!(err, AssetError::Unsupported(_)));
    }

    #[test]
    fn instantiate_shares_one_material() {
        let model = import_model("tri", &glb(&triangle_json(""), &triangle_bin()), |_| {
            Ok(Vec::new())
        })
        .unwrap();

        let mut universe = Universe::default();
        let chrome = universe.assets.add_material(Material::chrome(None));
        let root = model.instantiate(&mut universe, chrome);

        let nodes = universe.scene.traverse(root);
        assert_eq!(nodes.len(), 3);
        assert_eq!(universe.assets.mesh_count(), 2);

        let materials: Vec<_> = nodes
            .iter()
            .filter_map(|&k| universe.scene.get(k)?.renderable())
            .map(|r| r.material)
            .collect();
        assert_eq!(materials, [chrome, chrome]);
    }
}
