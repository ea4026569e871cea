use crate::calendar::MonthKey;
use crate::models::Category;

pub fn render_index(current: &MonthKey) -> String {
    let headers: String = Category::ALL
        .iter()
        .map(|category| format!("<th>{}</th>", category.label()))
        .collect();

    INDEX_HTML
        .replace("{{MONTH}}", current.month.name())
        .replace("{{YEAR}}", &current.year.to_string())
        .replace("{{CATEGORY_HEADERS}}", &headers)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>StudyTime</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f8f3e6;
      --bg-2: #f5d3a7;
      --ink: #2b2a28;
      --accent: #3b82f6;
      --accent-2: #10b981;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(920px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-size: clamp(2rem, 4vw, 2.8rem);
      margin: 0;
      text-align: center;
    }

    .subtitle {
      margin: 0;
      color: #5f5c57;
      text-align: center;
    }

    .hidden {
      display: none !important;
    }

    form.card, .chart-card {
      background: white;
      border-radius: 20px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 12px;
    }

    input {
      font: inherit;
      padding: 8px 10px;
      border: 1px solid #d1d5db;
      border-radius: 10px;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 10px 18px;
      font: inherit;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
    }

    button.secondary {
      background: rgba(47, 72, 88, 0.1);
      color: var(--ink);
    }

    .chart-card svg {
      width: 100%;
      height: 240px;
      display: block;
    }

    .chart-label {
      fill: #7a746d;
      font-size: 11px;
    }

    .chart-grid {
      stroke: rgba(47, 72, 88, 0.12);
    }

    .nav {
      display: flex;
      justify-content: space-between;
      align-items: center;
    }

    table {
      border-collapse: collapse;
      width: 100%;
      background: white;
    }

    th, td {
      border: 1px solid #d1d5db;
      padding: 4px 6px;
      text-align: center;
    }

    td input {
      width: 5.5rem;
      text-align: center;
    }

    td button {
      margin-top: 6px;
      padding: 4px 10px;
    }

    tfoot td {
      font-weight: 600;
      background: #f3f4f6;
    }

    .status {
      min-height: 1.2em;
      text-align: center;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .status[data-type="ok"] {
      color: #2d7a4b;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>StudyTime</h1>
      <p class="subtitle" id="total-hours">Total Hours Studied: -- hours</p>
    </header>

    <form class="card" id="login-form">
      <input name="username" type="email" placeholder="Your email address" required />
      <input name="password" type="password" placeholder="Password" required />
      <button type="submit">Login</button>
    </form>

    <section id="dashboard" class="hidden">
      <div class="chart-card">
        <h2>Programming</h2>
        <svg id="chart-programming" viewBox="0 0 600 240" role="img"></svg>
      </div>
      <div class="chart-card">
        <h2>Fitness</h2>
        <svg id="chart-fitness" viewBox="0 0 600 240" role="img"></svg>
      </div>

      <div class="nav">
        <button class="secondary" type="button" id="prev">&lt; Previous</button>
        <h3 id="month-title">{{MONTH}} {{YEAR}}</h3>
        <button class="secondary" type="button" id="next">Next &gt;</button>
      </div>

      <table>
        <thead><tr><th>Date</th>{{CATEGORY_HEADERS}}</tr></thead>
        <tbody id="grid-body"></tbody>
        <tfoot>
          <tr><td>Total</td><td id="total-programming">0</td><td id="total-fitness">0</td><td id="total-work">0</td></tr>
          <tr><td>Average</td><td id="avg-programming">0.00</td><td id="avg-fitness">0.00</td><td id="avg-work">0.00</td></tr>
        </tfoot>
      </table>

      <div class="nav">
        <button class="secondary" type="button" id="logout">Logout</button>
        <button class="secondary hidden" type="button" id="toggle-new-user">New User</button>
      </div>

      <form class="card hidden" id="new-user-form">
        <div>Create New User:</div>
        <input name="username" type="email" placeholder="Your email address" />
        <input name="password" type="password" placeholder="Password" />
        <label><input type="checkbox" name="admin" /> Admin</label>
        <button type="submit">Create</button>
      </form>
    </section>

    <div class="status" id="status"></div>
  </main>

  <script>
    const MONTHS = ['January', 'February', 'March', 'April', 'May', 'June', 'July',
      'August', 'September', 'October', 'November', 'December'];
    const CATEGORIES = ['programming', 'fitness', 'work'];

    const statusEl = document.getElementById('status');
    const loginForm = document.getElementById('login-form');
    const dashboard = document.getElementById('dashboard');
    const gridBody = document.getElementById('grid-body');
    const monthTitle = document.getElementById('month-title');
    const newUserForm = document.getElementById('new-user-form');
    const toggleNewUser = document.getElementById('toggle-new-user');

    let token = localStorage.getItem('sessionToken');
    let current = { month: MONTHS.indexOf('{{MONTH}}'), year: Number('{{YEAR}}') };
    let days = [];
    let activeCell = null;
    let loadToken = 0;
    let loading = false;

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const api = async (path, options = {}) => {
      const headers = { 'content-type': 'application/json' };
      if (token) {
        headers.authorization = `Bearer ${token}`;
      }
      const res = await fetch(path, { ...options, headers });
      if (res.status === 401 && path !== '/api/login') {
        logout();
      }
      if (!res.ok) {
        const body = await res.json().catch(() => ({ message: 'Request failed' }));
        throw new Error(body.message);
      }
      return res.status === 204 ? null : res.json();
    };

    const renderBarChart = (el, points, key, color) => {
      if (!points.length) {
        el.innerHTML = '<text class="chart-label" x="50%" y="50%" text-anchor="middle">No data yet</text>';
        return;
      }
      const width = 600;
      const height = 240;
      const padding = 40;
      const max = Math.max(1, ...points.map((point) => point[key]));
      const slot = (width - padding * 2) / points.length;
      const scale = (height - padding * 2) / max;
      const bars = points.map((point, index) => {
        const h = point[key] * scale;
        const x = padding + index * slot + slot * 0.15;
        const y = height - padding - h;
        return `<rect x="${x}" y="${y}" width="${slot * 0.7}" height="${h}" rx="4" fill="${color}"><title>${point.label} ${point[key]} minutes</title></rect>` +
          `<text class="chart-label" x="${x + slot * 0.35}" y="${height - padding + 16}" text-anchor="middle">${point.label}</text>`;
      }).join('');
      const base = `<line class="chart-grid" x1="${padding}" y1="${height - padding}" x2="${width - padding}" y2="${height - padding}" />`;
      el.innerHTML = base + bars;
    };

    const loadCharts = async () => {
      const [points, summary] = await Promise.all([api('/api/stats/monthly'), api('/api/stats/summary')]);
      renderBarChart(document.getElementById('chart-programming'), points, 'programming', '#3b82f6');
      renderBarChart(document.getElementById('chart-fitness'), points, 'fitness', '#10b981');
      document.getElementById('total-hours').textContent =
        `Total Hours Studied: ${summary.total_hours.toFixed(2)} hours`;
    };

    const validCell = (value) => /^\d+$/.test(String(value ?? '').trim());

    const renderSummary = () => {
      CATEGORIES.forEach((category) => {
        const values = days.map((day) => day[category]).filter(validCell).map(Number);
        const total = values.reduce((sum, value) => sum + value, 0);
        const average = values.length ? total / values.length : 0;
        document.getElementById(`total-${category}`).textContent = total;
        document.getElementById(`avg-${category}`).textContent = average.toFixed(2);
      });
    };

    const renderGrid = () => {
      gridBody.innerHTML = '';
      days.forEach((day, index) => {
        const row = document.createElement('tr');
        row.innerHTML = `<td>${index + 1}</td>`;
        CATEGORIES.forEach((category) => {
          const cell = document.createElement('td');
          const input = document.createElement('input');
          input.type = 'number';
          input.min = '0';
          input.value = day[category] ?? '';
          input.addEventListener('input', () => {
            activeCell = { index, category };
            if (input.value === '' || validCell(input.value)) {
              day[category] = input.value === '' ? null : Number(input.value);
              setStatus('', '');
            } else {
              setStatus('Minutes must be a whole number', 'error');
            }
            renderSubmitButton();
            renderSummary();
          });
          cell.appendChild(input);
          cell.dataset.index = index;
          cell.dataset.category = category;
          row.appendChild(cell);
        });
        gridBody.appendChild(row);
      });
      renderSummary();
    };

    const renderSubmitButton = () => {
      gridBody.querySelectorAll('td button').forEach((button) => button.remove());
      if (!activeCell) {
        return;
      }
      const cell = gridBody.querySelector(
        `td[data-index="${activeCell.index}"][data-category="${activeCell.category}"]`);
      const button = document.createElement('button');
      button.type = 'button';
      button.textContent = 'Submit';
      button.addEventListener('click', submit);
      cell.appendChild(button);
    };

    const loadMonth = async () => {
      const requestToken = ++loadToken;
      const { month, year } = current;
      monthTitle.textContent = `${MONTHS[month]} ${year}`;
      loading = true;
      activeCell = null;
      days = [];
      renderGrid();
      try {
        const grid = await api(`/api/grid/${MONTHS[month]}/${year}`);
        if (requestToken !== loadToken) {
          return;
        }
        days = grid.days;
      } catch (err) {
        if (requestToken !== loadToken) {
          return;
        }
        const count = new Date(year, month + 1, 0).getDate();
        days = Array.from({ length: count }, () => ({ programming: null, fitness: null, work: null }));
        setStatus(err.message, 'error');
      }
      loading = false;
      renderGrid();
    };

    const submit = async () => {
      if (loading) {
        return;
      }
      const { month, year } = current;
      try {
        await api(`/api/records/${MONTHS[month]}/${year}`, {
          method: 'PUT',
          body: JSON.stringify({ days })
        });
        activeCell = null;
        renderSubmitButton();
        setStatus('Data saved successfully!', 'ok');
        loadCharts().catch((err) => setStatus(err.message, 'error'));
      } catch (err) {
        setStatus('Error saving data. Please try again.', 'error');
      }
    };

    const showDashboard = async () => {
      loginForm.classList.add('hidden');
      dashboard.classList.remove('hidden');
      const me = await api('/api/me');
      toggleNewUser.classList.toggle('hidden', me.role !== 'admin');
      await Promise.all([loadCharts(), loadMonth()]);
    };

    const logout = () => {
      if (token) {
        fetch('/api/logout', { method: 'POST', headers: { authorization: `Bearer ${token}` } });
      }
      token = null;
      localStorage.removeItem('sessionToken');
      dashboard.classList.add('hidden');
      newUserForm.classList.add('hidden');
      loginForm.classList.remove('hidden');
    };

    loginForm.addEventListener('submit', async (event) => {
      event.preventDefault();
      const form = new FormData(loginForm);
      try {
        const login = await api('/api/login', {
          method: 'POST',
          body: JSON.stringify({ username: form.get('username'), password: form.get('password') })
        });
        token = login.token;
        localStorage.setItem('sessionToken', token);
        setStatus('', '');
        await showDashboard();
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    newUserForm.addEventListener('submit', async (event) => {
      event.preventDefault();
      const form = new FormData(newUserForm);
      try {
        await api('/api/users', {
          method: 'POST',
          body: JSON.stringify({
            username: form.get('username'),
            password: form.get('password'),
            role: form.get('admin') ? 'admin' : 'user'
          })
        });
        newUserForm.reset();
        setStatus('User created successfully', 'ok');
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    const shiftMonth = (delta) => {
      const date = new Date(current.year, current.month + delta, 1);
      current = { month: date.getMonth(), year: date.getFullYear() };
      loadMonth();
    };

    document.getElementById('prev').addEventListener('click', () => shiftMonth(-1));
    document.getElementById('next').addEventListener('click', () => shiftMonth(1));
    document.getElementById('logout').addEventListener('click', logout);
    toggleNewUser.addEventListener('click', () => newUserForm.classList.toggle('hidden'));

    if (token) {
      showDashboard().catch((err) => setStatus(err.message, 'error'));
    }
  </script>
</body>
</html>
"#;
