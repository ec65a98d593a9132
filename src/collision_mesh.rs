use crate::phys::Triangle;
use byteorder::{LittleEndian, ReadBytesExt};
use glam::Vec3A;
use std::io::{Cursor, Error as IoError, ErrorKind, Result as IoResult};

pub(crate) const COLLISION_MESH_FILE_EXTENSION: &str = "cmf";

/// A dumped arena collision mesh: an index buffer over a vertex soup.
///
/// Layout: `num_tris: i32, num_verts: i32, tris: [i32; num_tris * 3],
/// verts: [f32; num_verts * 3]`, all little-endian.
pub struct CollisionMeshFile {
    tris: Vec<[i32; 3]>,
    verts: Vec<Vec3A>,
}

impl CollisionMeshFile {
    pub fn read_from_bytes(bytes: &[u8]) -> IoResult<Self> {
        let mut cursor = Cursor::new(bytes);

        let num_tris = cursor.read_i32::<LittleEndian>()?;
        let num_verts = cursor.read_i32::<LittleEndian>()?;

        if num_tris <= 0 || num_verts <= 0 {
            return Err(IoError::new(
                ErrorKind::InvalidData,
                "empty or negative-sized collision mesh",
            ));
        }

        let num_tris = num_tris as usize;
        let num_verts = num_verts as usize;

        let expected = 8 + num_tris * 12 + num_verts * 12;
        if bytes.len() < expected {
            return Err(IoError::new(
                ErrorKind::UnexpectedEof,
                format!(
                    "collision mesh is {} bytes, expected at least {expected}",
                    bytes.len()
                ),
            ));
        }

        let mut tris = Vec::with_capacity(num_tris);
        for _ in 0..num_tris {
            let tri = [
                cursor.read_i32::<LittleEndian>()?,
                cursor.read_i32::<LittleEndian>()?,
                cursor.read_i32::<LittleEndian>()?,
            ];

            for &idx in &tri {
                if idx < 0 || idx as usize >= num_verts {
                    return Err(IoError::new(
                        ErrorKind::InvalidData,
                        format!("triangle index {idx} out of range"),
                    ));
                }
            }
            tris.push(tri);
        }

        let mut verts = Vec::with_capacity(num_verts);
        for _ in 0..num_verts {
            verts.push(Vec3A::new(
                cursor.read_f32::<LittleEndian>()?,
                cursor.read_f32::<LittleEndian>()?,
                cursor.read_f32::<LittleEndian>()?,
            ));
        }

        Ok(Self { tris, verts })
    }

    /// FNV-1a over the index buffer, used to recognize known arena dumps
    #[must_use]
    pub fn get_hash(&self) -> u32 {
        const FNV_OFFSET: u32 = 0x811C_9DC5;
        const FNV_PRIME: u32 = 0x0100_0193;

        let mut hash = FNV_OFFSET;
        for tri in &self.tris {
            for &idx in tri {
                for byte in idx.to_le_bytes() {
                    hash ^= u32::from(byte);
                    hash = hash.wrapping_mul(FNV_PRIME);
                }
            }
        }
        hash
    }

    #[must_use]
    pub fn into_triangles(self) -> Vec<Triangle> {
        self.tris
            .into_iter()
            .map(|[a, b, c]| Triangle {
                v0: self.verts[a as usize],
                v1: self.verts[b as usize],
                v2: self.verts[c as usize],
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use byteorder::WriteBytesExt;

    fn encode(tris: &[[i32; 3]], verts: &[[f32; 3]]) -> Vec<u8> {
        let mut out = Vec::new();
        out.write_i32::<LittleEndian>(tris.len() as i32).unwrap();
        out.write_i32::<LittleEndian>(verts.len() as i32).unwrap();
        for tri in tris {
            for &idx in tri {
                out.write_i32::<LittleEndian>(idx).unwrap();
            }
        }
        for vert in verts {
            for &coord in vert {
                out.write_f32::<LittleEndian>(coord).unwrap();
            }
        }
        out
    }

    #[test]
    fn decodes_a_single_triangle() {
        let bytes = encode(
            &[[0, 1, 2]],
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        );

        let mesh = CollisionMeshFile::read_from_bytes(&bytes).unwrap();
        let tris = mesh.into_triangles();
        assert_eq!(tris.len(), 1);
        assert_eq!(tris[0].v1, Vec3A::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let bytes = encode(&[[0, 1, 5]], &[[0.0; 3], [0.0; 3], [0.0; 3]]);
        assert!(CollisionMeshFile::read_from_bytes(&bytes).is_err());
    }

    #[test]
    fn rejects_truncated_input() {
        let mut bytes = encode(
            &[[0, 1, 2]],
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        );
        bytes.truncate(bytes.len() - 6);
        assert!(CollisionMeshFile::read_from_bytes(&bytes).is_err());
    }

    #[test]
    fn hash_is_stable_over_indices() {
        let bytes = encode(
            &[[0, 1, 2]],
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        );
        let a = CollisionMeshFile::read_from_bytes(&bytes).unwrap().get_hash();
        let b = CollisionMeshFile::read_from_bytes(&bytes).unwrap().get_hash();
        assert_eq!(a, b);
    }
}
