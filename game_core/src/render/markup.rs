use indoc::formatdoc;

use super::GridPicture;

/// A self-contained HTML page whose `#colorGridCanvas` element draws the grid,
/// labelled with one-based row and column numbers. The canvas is `side`
/// pixels square.
pub fn grid_document(picture: &GridPicture, side: u32) -> String {
    let round = picture.round();
    let (target_row, target_col) =
        crate::grid::block_to_row_col(round.grid_size(), round.target());
    formatdoc! {r#"
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Color grid</title>
            <style>
                body {{
                    display: flex;
                    justify-content: center;
                    align-items: center;
                    height: 100vh;
                    margin: 0;
                }}
            </style>
        </head>
        <body>
        <canvas id="colorGridCanvas"></canvas>
        <script>
            const n = {n};
            const blockSize = {block_size};
            const spacing = {spacing};
            const baseColor = '{base}';
            const diffColor = '{diff}';
            const offset = {offset};
            const diffRow = {target_row};
            const diffCol = {target_col};

            const canvas = document.getElementById('colorGridCanvas');
            const ctx = canvas.getContext('2d');
            canvas.width = {side};
            canvas.height = {side};

            for (let row = 0; row < n; row++) {{
                for (let col = 0; col < n; col++) {{
                    ctx.fillStyle = (row === diffRow && col === diffCol) ? diffColor : baseColor;
                    ctx.fillRect(col * (blockSize + spacing) + offset, row * (blockSize + spacing) + offset, blockSize, blockSize);
                }}
            }}

            ctx.fillStyle = '#000000';
            ctx.font = '30px Arial';
            ctx.textAlign = 'center';
            ctx.textBaseline = 'middle';
            for (let i = 0; i < n; i++) {{
                const center = i * (blockSize + spacing) + blockSize / 2 + offset;
                ctx.fillText(i + 1, center, blockSize / 2);
                ctx.fillText(i + 1, blockSize / 2, center);
            }}
        </script>
        </body>
        </html>
        "#,
        n = round.grid_size(),
        block_size = picture.block_size(),
        spacing = picture.spacing(),
        base = round.base(),
        diff = round.diff(),
        offset = picture.offset(),
    }
}
