//! # pressure 命令实现
//!
//! 由单个峰位计算压力，并逐步打印中间量。
//!
//! ## 依赖关系
//! - 使用 `cli/pressure.rs` 定义的参数
//! - 使用 `eos/` 计算压力
//! - 使用 `utils/output.rs` 输出

use crate::cli::pressure::PressureArgs;
use crate::eos::pressure::{d_spacing, wavelength_from_energy};
use crate::eos::{load_eos_params, BraggPeak, Calibrant, PressureCalculator};
use crate::error::Result;
use crate::utils::output;

/// 执行 pressure 命令
pub fn execute(args: PressureArgs) -> Result<()> {
    let calibrant: Calibrant = args.calibrant.calibrant.into();
    let peak: BraggPeak = args.calibrant.peak.into();
    let tth_offset = args.calibrant.tth_offset;

    output::print_header(&format!("{} ({}) Pressure Calculation", calibrant, peak));

    let calculator = PressureCalculator::new(calibrant, peak).with_tth_offset(tth_offset);
    let pressure = calculator.calculate(args.tth, args.temperature, args.energy)?;

    let wavelength = wavelength_from_energy(args.energy)?;
    let d = d_spacing(wavelength, args.tth - tth_offset)?;
    let volume = calculator.atomic_volume(args.tth, args.energy)?;
    let eos = load_eos_params(calibrant, args.temperature)?;

    output::print_info(&format!(
        "2θ = {:.4}° (offset {:.4}°), E = {:.4} keV, T = {:.1} K",
        args.tth, tth_offset, args.energy, args.temperature
    ));
    output::print_info(&format!("λ = {:.6} Å, d = {:.6} Å", wavelength, d));
    output::print_info(&format!(
        "a = {:.6} Å, V = {:.6} Å³",
        d * peak.lattice_factor(),
        volume
    ));
    output::print_info(&format!(
        "EOS: V0 = {:.4} Å³, K0 = {:.2} GPa, K0' = {:.3}",
        eos.v0, eos.k0, eos.kp0
    ));
    output::print_separator();
    output::print_pressure(&format!("{} ({})", calibrant, peak), pressure);

    Ok(())
}
