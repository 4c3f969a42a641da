//! 二维网格上的区域操作，内存与文件两种存储共用

use super::{CellValue, SheetRange, StoreError};

pub type Grid = Vec<Vec<CellValue>>;

/// 已用区域：从第 1 行到最后一个含内容的行
pub fn used_range(grid: &Grid) -> Grid {
    let used = used_row_count(grid);
    grid[..used].to_vec()
}

pub fn used_row_count(grid: &Grid) -> usize {
    grid.iter()
        .rposition(|row| row.iter().any(|cell| !cell.is_empty()))
        .map_or(0, |last| last + 1)
}

/// 清空区域内的单元格内容，行数保持不变
pub fn clear(grid: &mut Grid, range: SheetRange) -> Result<(), StoreError> {
    range.check()?;
    let first_row = range.row - 1;
    let first_col = range.column - 1;

    for line in grid.iter_mut().skip(first_row).take(range.num_rows) {
        for cell in line.iter_mut().skip(first_col).take(range.num_columns) {
            *cell = CellValue::Empty;
        }
    }
    Ok(())
}

/// 从 (row, column) 开始写入一个矩形区域，必要时扩展网格
pub fn write(grid: &mut Grid, row: usize, column: usize, values: &[Vec<CellValue>]) -> Result<(), StoreError> {
    if row == 0 || column == 0 {
        return Err(StoreError::RowOutOfRange { row });
    }

    for (offset, cells) in values.iter().enumerate() {
        let r = row - 1 + offset;
        if grid.len() <= r {
            grid.resize_with(r + 1, Vec::new);
        }
        let line = &mut grid[r];
        let end = column - 1 + cells.len();
        if line.len() < end {
            line.resize(end, CellValue::Empty);
        }
        line[column - 1..end].clone_from_slice(cells);
    }
    Ok(())
}

/// 删除第 `row` 行（从 1 开始），后面的行整体上移
pub fn delete_row(grid: &mut Grid, row: usize) -> Result<(), StoreError> {
    if row == 0 || row > grid.len() {
        return Err(StoreError::RowOutOfRange { row });
    }
    grid.remove(row - 1);
    Ok(())
}

/// 表头之后的已用区域，没有数据行时为 `None`
pub fn body_range(last_row: usize, header_rows: usize, width: usize) -> Option<SheetRange> {
    (last_row > header_rows)
        .then(|| SheetRange::new(header_rows + 1, 1, last_row - header_rows, width))
}

/// 清空 `header_rows` 之后的所有行并从下一行开始写入新数据
pub fn replace_body(
    grid: &mut Grid,
    header_rows: usize,
    width: usize,
    values: &[Vec<CellValue>],
) -> Result<(), StoreError> {
    if let Some(range) = body_range(used_row_count(grid), header_rows, width) {
        clear(grid, range)?;
    }
    if !values.is_empty() {
        write(grid, header_rows + 1, 1, values)?;
    }
    Ok(())
}

/// 去掉末尾的空行
pub fn truncate_unused(grid: &mut Grid) {
    let used = used_row_count(grid);
    grid.truncate(used);
}
