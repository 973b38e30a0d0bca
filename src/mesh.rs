//! NEMO grid metrics from `mesh_mask.nc`

use crate::errors::Result;
use crate::grid::{Dataset, LabeledArray};
use crate::netcdf_io::open_dataset;
use log::info;
use std::path::Path;

/// Reference sea-water density used by NEMO (kg/m3)
pub const RHO0: f64 = 1026.0;

/// Grid points of the staggered Arakawa-C grid
const POINTS: [(&str, &str); 3] = [("t", "deptht"), ("u", "depthu"), ("v", "depthv")];

fn field(mesh: &Dataset, name: &str) -> Result<LabeledArray> {
    Ok(mesh.get(name)?.squeeze())
}

fn vertical(mesh: &Dataset, name: &str, depth_dim: &str) -> Result<LabeledArray> {
    Ok(mesh.get(name)?.rename_dim("z", depth_dim).squeeze())
}

/// Read cell areas, volumes, masks and depths from a NEMO mesh file
///
/// The mesh file uses `z` as vertical dimension while model output uses `deptht`,
/// `depthu` and `depthv`; the returned fields use the latter. Singleton dimensions
/// (the mesh's time axis) are dropped.
///
/// Returned variables: `areacello{,_u,_v}` (m2), `volcello` (m3), `masscello` (kg/m2),
/// `deptho{,_u,_v}` (m), `dzt`, `dzu`, `dzv`, `e1t`, `e2t`, `tmask`, `umask`, `vmask`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a required field is missing.
pub fn read_nemo_mesh(mesh_mask_file: &Path) -> Result<Dataset> {
    info!("Open NEMO mesh_mask file: {}", mesh_mask_file.display());
    let mesh = open_dataset(mesh_mask_file)?;

    let mut out = Vec::new();
    let mut areas = Vec::new();
    for (point, depth_dim) in POINTS {
        let e1 = field(&mesh, &format!("e1{}", point))?;
        let e2 = field(&mesh, &format!("e2{}", point))?;
        let suffix = if point == "t" { String::new() } else { format!("_{}", point) };

        let area = e1
            .mul(&e2)?
            .renamed(format!("areacello{}", suffix))
            .with_attr("units", "m2");

        let dz = vertical(&mesh, &format!("e3{}_0", point), depth_dim)?.renamed(format!("dz{}", point));
        let mask = vertical(&mesh, &format!("{}mask", point), depth_dim)?;

        // gdept_0 is the T-point name; U and V depths are stored without the suffix
        let depth_name = if point == "t" { "gdept_0".to_string() } else { format!("gdep{}", point) };
        let depth = vertical(&mesh, &depth_name, depth_dim)?
            .where_cond(&mask, |m| m != 0.0)?
            .max_over(&[depth_dim])?
            .renamed(format!("deptho{}", suffix))
            .with_attr("units", "m");

        if point == "t" {
            let volume = e1
                .mul(&e2)?
                .mul(&dz)?
                .transpose(&[depth_dim, "y", "x"])?
                .renamed("volcello")
                .with_attr("units", "m3");
            let mass = volume
                .zip_with(&area, |v, a| v * RHO0 / a)?
                .renamed("masscello")
                .with_attr("units", "kg/m2");
            out.push(e1.clone());
            out.push(e2.clone());
            out.push(volume);
            out.push(mass);
        }

        areas.push(area);
        out.push(dz);
        out.push(depth);
        out.push(mask);
    }

    Dataset::from_arrays(areas.into_iter().chain(out))
}

/// Approximate time-varying cell thickness for runs with variable volume
///
/// Uses NEMO's `dz = dz0 * (1 + ssh / depth0)`. Offline values from 5-day or monthly
/// SSH are usually within a few percent of the online ones.
///
/// Returns `(dz, volcello, masscello)`.
///
/// # Errors
///
/// Returns an error if the fields do not share their horizontal grid.
pub fn compute_dz_tilde(
    ssh: &LabeledArray,
    dz0: &LabeledArray,
    depth0: &LabeledArray,
    areacello: &LabeledArray,
) -> Result<(LabeledArray, LabeledArray, LabeledArray)> {
    let stretch = ssh.zip_with(depth0, |s, h| 1.0 + s / h)?;
    let dz = stretch.mul(dz0)?;

    // time first, then the layout of dz0
    let order: Vec<String> = ssh
        .dims()
        .iter()
        .filter(|d| !dz0.has_dim(d))
        .chain(dz0.dims().iter())
        .cloned()
        .collect();
    let dz = dz.transpose(&order)?.renamed("dz").with_attr("units", "m");

    let masscello = dz.scale(RHO0).renamed("masscello").with_attr("units", "kg/m2");
    let volcello = dz
        .mul(areacello)?
        .renamed("volcello")
        .with_attr("units", "m3");

    Ok((dz, volcello, masscello))
}
