use approx::assert_relative_eq;
use glam::Vec3;
use image::{GrayImage, Luma};

use terrain_viewer::world::{
    height_at, HeightQuery, HeightmapImage, ImageOrigin, OutOfBounds, TerrainError, TerrainMesh,
    TerrainParams,
};

/// Deterministic bumpy heightmap.
fn noise_image(width: u32, height: u32) -> HeightmapImage {
    let data = (0..width * height)
        .map(|n| ((n.wrapping_mul(2_654_435_761) >> 13) % 256) as u8)
        .collect();
    HeightmapImage::from_raw(width, height, data).unwrap()
}

fn params(stride: u32) -> TerrainParams {
    TerrainParams {
        stride,
        world_extent: 60.0,
        height_scale: 8.0,
    }
}

#[test]
fn test_vertex_and_index_counts() {
    let cases = [
        (1, 2, 2),
        (1, 7, 3),
        (2, 9, 9),
        (3, 10, 7),
        (8, 64, 40),
        (5, 11, 26),
    ];
    for &(stride, width, height) in &cases {
        let mesh = TerrainMesh::build(&noise_image(width, height), &params(stride)).unwrap();
        let gw = (width / stride) as usize;
        let gh = (height / stride) as usize;

        assert_eq!(mesh.grid_width(), gw);
        assert_eq!(mesh.grid_height(), gh);
        assert_eq!(mesh.vertices().len(), gw * gh);
        assert_eq!(mesh.indices().len(), 6 * (gw - 1) * (gh - 1));
        assert_eq!(mesh.triangle_count(), 2 * (gw - 1) * (gh - 1));
    }
}

#[test]
fn test_indices_in_range() {
    let mesh = TerrainMesh::build(&noise_image(50, 30), &params(3)).unwrap();
    let count = mesh.vertices().len() as u32;
    assert!(mesh.indices().iter().all(|&i| i < count));
}

#[test]
fn test_uniform_winding() {
    let mesh = TerrainMesh::build(&noise_image(40, 40), &params(4)).unwrap();
    let pos = |i: u32| Vec3::from(mesh.vertices()[i as usize].position);

    for tri in mesh.indices().chunks_exact(3) {
        let (a, b, c) = (pos(tri[0]), pos(tri[1]), pos(tri[2]));
        let normal = (b - a).cross(c - a);
        assert!(normal.y > 0.0, "triangle {:?} faces down", tri);
    }
}

#[test]
fn test_normals_are_unit_and_upward() {
    let mesh = TerrainMesh::build(&noise_image(33, 21), &params(2)).unwrap();
    for v in mesh.vertices() {
        let n = Vec3::from(v.normal);
        assert_relative_eq!(n.length(), 1.0, epsilon = 1e-5);
        assert!(n.y > 0.0);
    }
}

#[test]
fn test_footprint_spans_extent() {
    let mesh = TerrainMesh::build(&noise_image(24, 16), &params(4)).unwrap();
    let (gw, gh) = (mesh.grid_width(), mesh.grid_height());

    let first = mesh.vertex(0, 0);
    let last = mesh.vertex(gw - 1, gh - 1);
    assert_relative_eq!(first.position[0], -30.0);
    assert_relative_eq!(first.position[2], -30.0);
    assert_relative_eq!(last.position[0], 30.0, epsilon = 1e-4);
    assert_relative_eq!(last.position[2], 30.0, epsilon = 1e-4);
    assert_eq!(first.uv, [0.0, 0.0]);
    assert_eq!(last.uv, [1.0, 1.0]);
}

#[test]
fn test_height_query_reproduces_every_vertex() {
    let cases = [
        (1, 5, 5, 4.0),
        (3, 40, 25, 60.0),
        (8, 128, 96, 250.0),
        (2, 17, 9, 0.5),
    ];
    for &(stride, width, height, extent) in &cases {
        let params = TerrainParams {
            stride,
            world_extent: extent,
            height_scale: 12.5,
        };
        let mesh = TerrainMesh::build(&noise_image(width, height), &params).unwrap();
        for v in mesh.vertices() {
            let [x, y, z] = v.position;
            assert_eq!(height_at(&mesh, x, z, extent), y, "vertex at ({}, {})", x, z);
        }
    }
}

#[test]
fn test_height_query_stays_within_cell_corners() {
    let mesh = TerrainMesh::build(&noise_image(20, 20), &params(2)).unwrap();
    let query = HeightQuery::new(&mesh, OutOfBounds::Unclamped);
    let cell = 60.0 / (mesh.grid_width() - 1) as f32;

    for j in 0..mesh.grid_height() - 1 {
        for i in 0..mesh.grid_width() - 1 {
            let corners = [
                mesh.vertex(i, j).position[1],
                mesh.vertex(i + 1, j).position[1],
                mesh.vertex(i, j + 1).position[1],
                mesh.vertex(i + 1, j + 1).position[1],
            ];
            let lo = corners.iter().copied().fold(f32::INFINITY, f32::min);
            let hi = corners.iter().copied().fold(f32::NEG_INFINITY, f32::max);

            let x = -30.0 + (i as f32 + 0.37) * cell;
            let z = -30.0 + (j as f32 + 0.61) * cell;
            let h = query.height_at(x, z);
            assert!(h >= lo - 1e-4 && h <= hi + 1e-4);
        }
    }
}

#[test]
fn test_outside_footprint_uses_policy() {
    let mesh = TerrainMesh::build(&noise_image(16, 16), &params(4)).unwrap();

    assert_eq!(height_at(&mesh, 31.0, 0.0, 60.0), 0.0);
    assert_eq!(height_at(&mesh, 0.0, f32::NAN, 60.0), 0.0);

    let query = HeightQuery::new(&mesh, OutOfBounds::Fallback(-5.0));
    assert_eq!(query.height_at(-100.0, 0.0), -5.0);
    assert!(query.contains(30.0, 30.0));
    assert!(!query.contains(30.5, 30.0));
}

#[test]
fn test_degenerate_grid_is_rejected() {
    let image = noise_image(15, 40);
    let err = TerrainMesh::build(&image, &params(8)).unwrap_err();
    assert!(matches!(err, TerrainError::DegenerateGrid { grid_width: 1, grid_height: 5, .. }));
}

#[test]
fn test_four_by_four_end_to_end() {
    #[rustfmt::skip]
    let data = vec![
        0,   0,   0,   0,
        0,  255, 255,  0,
        0,  255, 255,  0,
        0,   0,   0,   0,
    ];
    let image = HeightmapImage::from_raw(4, 4, data).unwrap();
    let params = TerrainParams {
        stride: 1,
        world_extent: 3.0,
        height_scale: 3.0,
    };
    let mesh = TerrainMesh::build(&image, &params).unwrap();

    assert_eq!(mesh.vertices().len(), 16);
    assert_eq!(mesh.triangle_count(), 18);
    assert_eq!(mesh.height_range(), (0.0, 3.0));

    // Grid spacing is 1, so the raised plateau spans x, z in [-0.5, 0.5].
    assert_relative_eq!(height_at(&mesh, 0.0, 0.0, 3.0), 3.0);
    assert_relative_eq!(height_at(&mesh, -1.0, 0.0, 3.0), 1.5);
    assert_relative_eq!(height_at(&mesh, -1.5, -1.5, 3.0), 0.0);
    assert_eq!(height_at(&mesh, 2.0, 0.0, 3.0), 0.0);

    // Flat plateau top has an upward normal only where neighbours agree.
    let corner = Vec3::from(mesh.vertex(0, 0).normal);
    assert_relative_eq!(corner.y, 1.0, epsilon = 1e-6);
}

#[test]
fn test_flat_four_by_four() {
    let image = HeightmapImage::from_raw(4, 4, vec![0; 16]).unwrap();
    let params = TerrainParams {
        stride: 1,
        world_extent: 2.0,
        height_scale: 1.0,
    };
    let mesh = TerrainMesh::build(&image, &params).unwrap();

    assert_eq!(mesh.vertices().len(), 16);
    assert_eq!(mesh.indices().len(), 54);
    for v in mesh.vertices() {
        assert_eq!(v.position[1], 0.0);
        assert_eq!(v.normal, [0.0, 1.0, 0.0]);
    }
    assert_eq!(height_at(&mesh, 0.3, -0.7, 2.0), 0.0);
}

#[test]
fn test_load_png_from_disk_with_flip() {
    let dir = std::env::temp_dir().join(format!("terrain-viewer-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("ramp.png");

    // Top row dark, bottom row bright.
    let img = GrayImage::from_fn(16, 16, |_, y| Luma([(y * 17) as u8]));
    img.save(&path).unwrap();

    let top_left = HeightmapImage::load(&path, ImageOrigin::TopLeft).unwrap();
    assert_eq!(top_left.sample(0, 0), 0);
    assert_eq!(top_left.sample(0, 15), 255);

    let bottom_left = HeightmapImage::load(&path, ImageOrigin::BottomLeft).unwrap();
    assert_eq!(bottom_left.sample(0, 0), 255);
    assert_eq!(bottom_left.sample(0, 15), 0);

    let mesh = TerrainMesh::build(&bottom_left, &params(4)).unwrap();
    assert!(mesh.vertex(0, 0).position[1] > mesh.vertex(0, 3).position[1]);

    let missing = HeightmapImage::load(dir.join("missing.png"), ImageOrigin::TopLeft);
    assert!(missing.is_err());

    std::fs::remove_dir_all(&dir).ok();
}
